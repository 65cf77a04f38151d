tonic::include_proto!("pcapextractor");
