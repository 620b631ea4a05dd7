use access_matrix_cli::output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = access_matrix_cli::run().await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
