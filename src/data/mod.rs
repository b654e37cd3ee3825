pub mod acceptance;
