mod client;
mod helpers;
mod reports;
