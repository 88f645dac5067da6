pub mod mathutil;
