use std::collections::BTreeMap;

pub type JobId = String;
pub type RefId = String;
/// pcap file name -> packet numbers to extract from it
pub type Extract = BTreeMap<String, Vec<i64>>;
