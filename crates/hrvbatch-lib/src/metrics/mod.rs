pub mod hrv;
pub mod psd;
pub mod select;
