mod concurrent_tests;
mod edge_case_tests;
