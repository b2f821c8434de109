fn main() {
    salesdesk_lib::run()
}
