fn main() {
    println!("cargo:rerun-if-changed=partitions.csv");

    // Only the firmware build needs the ESP-IDF environment; host test
    // builds run without the `espidf` feature.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
