fn main() {
    // No-op on host targets; emits the ESP-IDF link/env directives when the
    // ESP build environment is present.
    embuild::espidf::sysenv::output();
}
