pub(crate) mod http_utils;
