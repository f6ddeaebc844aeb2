use std::sync::Arc;

use spclient_auth::{AuthContext, RequestBuilder, RequestDescriptor, SignedRequest, Signer};
use spclient_route::{ChainMetadata, EndpointResolver, RouteKey, SpDirectory, SpEndpoint};
use spclient_transport::{CallContext, HttpClient, SendOptions, SpResponse, Transport};

use crate::config::ClientConfig;
use crate::error::Result;

/// Storage provider client.
///
/// Every call runs the same pipeline: resolve the endpoint, build and sign
/// the request, send it through the transport. The client holds no mutable
/// state besides the resolver's directory snapshot and is shared freely
/// across tasks behind an `Arc`.
pub struct SpClient<C, M> {
    config: ClientConfig,
    resolver: EndpointResolver<M>,
    builder: RequestBuilder,
    transport: Transport<C>,
    auth: AuthContext,
}

impl<C: HttpClient, M: ChainMetadata> SpClient<C, M> {
    /// Creates a client with an empty provider directory.
    ///
    /// Call [`refresh_endpoints`](Self::refresh_endpoints) before routing, or
    /// use [`connect`](Self::connect).
    pub fn new(config: ClientConfig, client: C, metadata: M, signer: Arc<dyn Signer>) -> Self {
        let transport = Transport::new(client)
            .with_policy(config.retry_policy())
            .with_timeout(config.timeout());
        Self {
            resolver: EndpointResolver::new(metadata, config.secure),
            builder: RequestBuilder::new(config.addressing.style()),
            transport,
            auth: AuthContext::new(signer),
            config,
        }
    }

    /// Creates a client and loads the provider directory.
    pub async fn connect(
        config: ClientConfig,
        client: C,
        metadata: M,
        signer: Arc<dyn Signer>,
    ) -> Result<Self> {
        config.validate()?;
        let sp = Self::new(config, client, metadata, signer);
        sp.refresh_endpoints().await?;
        Ok(sp)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn resolver(&self) -> &EndpointResolver<M> {
        &self.resolver
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub async fn refresh_endpoints(&self) -> Result<Arc<SpDirectory>> {
        Ok(self.resolver.refresh().await?)
    }

    pub async fn resolve_endpoint(&self, key: RouteKey<'_>) -> Result<SpEndpoint> {
        Ok(self.resolver.resolve(key).await?)
    }

    pub fn build_signed_request(
        &self,
        desc: &RequestDescriptor,
        endpoint: &SpEndpoint,
    ) -> Result<SignedRequest> {
        Ok(self.builder.build_now(desc, &endpoint.base_url, &self.auth)?)
    }

    pub(crate) async fn send(
        &self,
        ctx: &CallContext,
        desc: &RequestDescriptor,
        endpoint: &SpEndpoint,
        options: SendOptions,
    ) -> Result<SpResponse> {
        let request = self.build_signed_request(desc, endpoint)?;
        Ok(self.transport.send(ctx, &request, options).await?)
    }
}

#[cfg(feature = "reqwest")]
impl<M: ChainMetadata> SpClient<spclient_transport::ReqwestClient, M> {
    /// Client over the production reqwest transport.
    pub async fn connect_reqwest(
        config: ClientConfig,
        metadata: M,
        signer: Arc<dyn Signer>,
    ) -> Result<Self> {
        let client = spclient_transport::ReqwestClient::new()?;
        Self::connect(config, client, metadata, signer).await
    }
}
