use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::graph_client::GraphClient;
use crate::services::image_gen::ImageGenerator;
use crate::services::image_host::UploadChain;
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub settings: Arc<Settings>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint(
                "Every tool in tool_catalog.json must be registered with a handler in App::initialize",
            )
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    fn register(
        handlers: &mut HashMap<String, Arc<dyn ToolHandler>>,
        tools: &[&str],
        handler: Arc<dyn ToolHandler>,
    ) {
        for tool in tools {
            handlers.insert(tool.to_string(), handler.clone());
        }
    }

    pub fn initialize(settings: Settings, logger: Logger) -> Result<Self, ToolError> {
        let settings = Arc::new(settings);
        let validation = Validation::new();

        let graph = Arc::new(GraphClient::new(logger.clone(), settings.clone())?);
        let http = graph.http().clone();
        let generator = Arc::new(ImageGenerator::new(
            logger.clone(),
            settings.clone(),
            http.clone(),
        ));
        let chain = Arc::new(UploadChain::from_settings(
            logger.clone(),
            &settings,
            http.clone(),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        Self::register(
            &mut handlers,
            managers::accounts::ACCOUNT_TOOLS,
            Arc::new(managers::accounts::AccountManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::campaigns::CAMPAIGN_TOOLS,
            Arc::new(managers::campaigns::CampaignManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::adsets::ADSET_TOOLS,
            Arc::new(managers::adsets::AdSetManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::ads::AD_TOOLS,
            Arc::new(managers::ads::AdManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::creatives::CREATIVE_TOOLS,
            Arc::new(managers::creatives::CreativeManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::insights::INSIGHT_TOOLS,
            Arc::new(managers::insights::InsightsManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::targeting::TARGETING_TOOLS,
            Arc::new(managers::targeting::TargetingManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::objects::OBJECT_TOOLS,
            Arc::new(managers::objects::ObjectManager::new(
                logger.clone(),
                validation.clone(),
                graph.clone(),
            )),
        );
        Self::register(
            &mut handlers,
            managers::images::IMAGE_TOOLS,
            Arc::new(managers::images::ImageManager::new(
                logger.clone(),
                validation,
                generator,
                chain.clone(),
                http,
            )),
        );

        Self::validate_tool_wiring(&handlers)?;

        if settings.access_token.is_none() {
            logger.warn(
                "META_ACCESS_TOKEN is not set; ads tools will fail until it is provided",
                None,
            );
        }
        logger.info(
            "Server ready",
            Some(&serde_json::json!({
                "tools": handlers.len(),
                "api_version": settings.api_version,
                "image_hosts": chain.provider_names(),
            })),
        );

        let tool_executor = Arc::new(ToolExecutor::new(
            logger.clone(),
            handlers,
            settings.secrets(),
        ));
        Ok(Self {
            logger,
            settings,
            tool_executor,
        })
    }
}
