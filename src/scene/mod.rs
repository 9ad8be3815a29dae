pub(crate) mod clip;
