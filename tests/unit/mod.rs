/// Unit tests of the public library API
mod auth_tests;
mod paging_tests;
