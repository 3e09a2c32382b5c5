pub mod test_config;
pub mod test_layers;
