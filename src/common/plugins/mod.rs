pub mod nntree;
