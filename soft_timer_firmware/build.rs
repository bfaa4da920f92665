use std::env;

fn main() {
    // Default LED blink interval, in ticks of the slow service
    if env::var("LED_BLINK_TICKS").is_err() {
        println!("cargo:rustc-env=LED_BLINK_TICKS=50");
    }
    println!("cargo:rerun-if-env-changed=LED_BLINK_TICKS");
}
