pub mod passive;
