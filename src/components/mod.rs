pub mod adder;
pub mod bus;
