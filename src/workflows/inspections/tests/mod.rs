mod common;

mod approval;
