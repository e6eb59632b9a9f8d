pub mod decommission;
pub mod resolve;
pub mod terminate;
