// Reference backends over in-memory bulletins.
//
// - `validator`: DdsValidator: checks stored variables against the program
// - `printer`:  DdsPrinter: structured dump in program order

pub mod printer;
pub mod validator;

pub use printer::DdsPrinter;
pub use validator::DdsValidator;
