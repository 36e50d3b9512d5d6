pub mod personalizer;
