pub mod ibi;
pub mod table;
