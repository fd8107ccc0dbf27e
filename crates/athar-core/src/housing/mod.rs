pub mod buy_vs_rent;
