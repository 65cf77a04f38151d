fn main() {
    println!("cargo:rerun-if-changed=./pcapextractor.proto");
    tonic_build::compile_protos("./pcapextractor.proto")
        .unwrap_or_else(|err| panic!("Failed to compile protos {:?}", err));
}
