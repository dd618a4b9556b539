pub(crate) mod interp;
