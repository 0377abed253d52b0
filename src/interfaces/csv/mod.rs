pub mod entry_writer;
