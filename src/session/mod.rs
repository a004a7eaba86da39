pub mod workout;
