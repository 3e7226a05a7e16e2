// rust_embed needs the embedded folder at compile time. Without a prior
// `trunk build` the console dist is missing, so create a placeholder.

use std::path::Path;

fn main() {
    let dist = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../frontend/dist");

    if !dist.exists() {
        std::fs::create_dir_all(&dist).expect("failed to create placeholder frontend/dist");
        std::fs::write(
            dist.join("index.html"),
            "<!-- placeholder: run `trunk build --release` in frontend/ to build the console -->\n",
        )
        .expect("failed to write placeholder index.html");
    }

    println!("cargo:rerun-if-changed=../../frontend/dist");
}
