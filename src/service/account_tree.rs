use crate::db::Account;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountNode {
    pub id: i64,
    pub name: Option<String>,
    pub children: Vec<AccountNode>,
}

/// Assemble the account hierarchy from flat parent references.
///
/// Pass one indexes every account by id; pass two links each account under its
/// parent. Accounts whose parent is not in `accounts` are dropped from the
/// tree entirely rather than promoted to roots. Roots and children keep input
/// order.
pub fn build_account_tree(accounts: &[Account]) -> Vec<AccountNode> {
    let index: HashMap<i64, usize> = accounts
        .iter()
        .enumerate()
        .map(|(pos, acc)| (acc.id, pos))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); accounts.len()];
    let mut roots = Vec::new();
    for (pos, acc) in accounts.iter().enumerate() {
        match acc.parent_id {
            None => roots.push(pos),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent_pos) => children[parent_pos].push(pos),
                None => {
                    // orphan: kept in storage, left out of the tree
                    debug!(
                        account_id = acc.id,
                        parent_id, "Dropping account with unknown parent from tree"
                    );
                }
            },
        }
    }

    // Only nodes reachable from a root are visited, so a parent cycle can
    // never be walked.
    let mut preorder = Vec::with_capacity(accounts.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        preorder.push(pos);
        stack.extend(children[pos].iter().rev());
    }

    // Children follow their parent in preorder, so walking it backwards
    // finishes every child before its parent needs it.
    let mut built: Vec<Option<AccountNode>> = vec![None; accounts.len()];
    for &pos in preorder.iter().rev() {
        let node = AccountNode {
            id: accounts[pos].id,
            name: accounts[pos].name.clone(),
            children: children[pos]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect(),
        };
        built[pos] = Some(node);
    }

    roots
        .into_iter()
        .filter_map(|pos| built[pos].take())
        .collect()
}
