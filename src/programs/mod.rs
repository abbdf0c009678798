pub mod hello_anchor;
pub mod system;
pub mod tic_tac_toe;
