pub mod currency_source;
pub mod enrichment;
pub mod flag_validator;
pub mod rate_board;

#[cfg(test)]
pub mod fakes;
