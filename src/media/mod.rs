pub(crate) mod decoder;
pub(crate) mod demux;
pub(crate) mod probe;
pub(crate) mod reassembly;
