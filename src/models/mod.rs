pub mod rate_row;
