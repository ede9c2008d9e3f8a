pub mod qbo;
