mod lifecycle_test;
mod load_test;
mod lookup_test;
