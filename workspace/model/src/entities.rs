pub mod account;
pub mod budget;
pub mod category;
pub mod installment;
pub mod payable_bill;
pub mod payment;
pub mod transaction;
pub mod user;
