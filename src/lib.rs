#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use jk_reflect as reflect;
pub use jk_utils as utils;
