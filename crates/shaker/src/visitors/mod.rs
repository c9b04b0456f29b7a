pub mod remove_side_effect;
