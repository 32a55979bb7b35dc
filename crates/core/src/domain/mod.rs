pub mod message;
pub mod product;
pub mod question;
pub mod ticket;
