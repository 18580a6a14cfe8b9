pub mod db;

#[cfg(test)]
mod integration_tests;
