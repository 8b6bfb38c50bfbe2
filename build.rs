fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF environment is only needed when building the device binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
