/// Database connection tests
pub mod db_tests;
