mod helpers;
mod mocks;

mod pages;
mod payments;
mod status;
mod webhook;
