pub mod input;
pub mod output;
pub mod read_input_functions;
