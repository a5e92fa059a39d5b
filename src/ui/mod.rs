pub mod charts;
pub mod images;
pub mod panels;
pub mod table;
