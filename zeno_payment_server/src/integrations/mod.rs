pub mod zenopay;
