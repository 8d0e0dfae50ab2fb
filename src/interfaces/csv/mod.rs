pub mod purchase_reader;
pub mod transaction_writer;
