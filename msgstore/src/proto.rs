pub mod envelope {
    include!("./generated/envelope.rs");
}
