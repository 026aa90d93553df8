/// Integration tests driving the server end to end
mod server_flow;
