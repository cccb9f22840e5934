pub mod client;
pub mod news;
pub mod translate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
