// tests/common/mod.rs
#![allow(dead_code)]

use std::net::SocketAddr;

use vaultkeep::{
    network::{TcpTransport, TransportConfig},
    utils::config::Config,
    Application, VaultClient,
};

pub struct TestContext {
    pub app: Application,
    pub addr: SocketAddr,
    pub config: Config,
}

impl TestContext {
    pub async fn new(tree_depth: u32) -> Self {
        let mut config = Config::defaults().expect("default config");
        config.node.port = 0;
        config.storage.tree_depth = tree_depth;
        config.client.request_timeout = 10;

        let app = Application::new(config.clone()).expect("application");
        let addr = app.start().await.expect("server start");
        config.client.server_address = addr.to_string();

        Self { app, addr, config }
    }

    pub fn client(&self) -> VaultClient<TcpTransport> {
        let transport = TcpTransport::new(self.addr.to_string(), TransportConfig::from_config(&self.config));
        VaultClient::from_config(transport, &self.config).expect("client")
    }

    pub async fn shutdown(self) {
        self.app.shutdown().await.expect("shutdown");
    }
}
