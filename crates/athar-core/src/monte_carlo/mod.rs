pub mod wealth;
